//! Drives `Add` requests through the simulated adder.

use super::adder::{signal, Adder};
use crate::bridge::Transactor;
use crate::message::{AddOperands, AddResult, OperationError, Reply};
use crate::sim::Edges;
use futures::future::LocalBoxFuture;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace;

/// Applies operands, waits one rising edge, then samples `res`.
pub struct AdderTransactor {
    device: Rc<RefCell<Adder>>,
    edges: Edges,
}

impl AdderTransactor {
    pub fn new(device: Rc<RefCell<Adder>>, edges: Edges) -> Self {
        Self { device, edges }
    }

    fn check_operand(&self, name: &str, value: u64) -> Result<(), OperationError> {
        let device = self.device.borrow();
        if device.accepts(value) {
            Ok(())
        } else {
            Err(OperationError::ProtocolViolation(format!(
                "{} = {} does not fit the {}-bit input (max {})",
                name,
                value,
                device.width(),
                device.max_operand()
            )))
        }
    }
}

impl Transactor for AdderTransactor {
    type Request = AddOperands;
    type Response = AddResult;

    fn name(&self) -> &str {
        "adder"
    }

    fn drive<'a>(&'a mut self, request: AddOperands) -> LocalBoxFuture<'a, Reply<AddResult>> {
        Box::pin(async move {
            self.check_operand(signal::INA, request.ina)?;
            self.check_operand(signal::INB, request.inb)?;

            {
                let mut device = self.device.borrow_mut();
                device.set_ina(request.ina);
                device.set_inb(request.inb);
            }

            let cycle = self
                .edges
                .next_edge()
                .await
                .map_err(|e| OperationError::Failed(e.to_string()))?;

            let res = self.device.borrow().res();
            trace!(cycle, ina = request.ina, inb = request.inb, res, "Sampled adder output");
            Ok(AddResult { res })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Clock;
    use tokio::task::LocalSet;

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_result_valid_after_exactly_one_edge() {
        LocalSet::new()
            .run_until(async {
                let mut clock = Clock::new(Adder::default());
                let mut transactor = AdderTransactor::new(clock.device(), clock.edges());

                let task = tokio::task::spawn_local(async move {
                    transactor.drive(AddOperands::new(3, 4)).await
                });
                settle().await;
                assert!(!task.is_finished(), "result must wait for the edge");

                clock.step();
                assert_eq!(task.await.unwrap(), Ok(AddResult { res: 7 }));
            })
            .await;
    }

    #[tokio::test]
    async fn test_oversized_operand_is_protocol_violation() {
        let clock = Clock::new(Adder::new(4));
        let mut transactor = AdderTransactor::new(clock.device(), clock.edges());

        let reply = transactor.drive(AddOperands::new(16, 1)).await;
        match reply {
            Err(OperationError::ProtocolViolation(msg)) => {
                assert!(msg.contains("ina = 16"));
                assert!(msg.contains("4-bit"));
            }
            other => panic!("expected protocol violation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stopped_clock_fails_operation() {
        let clock = Clock::new(Adder::default());
        let mut transactor = AdderTransactor::new(clock.device(), clock.edges());
        drop(clock);

        let reply = transactor.drive(AddOperands::new(1, 1)).await;
        assert_eq!(reply, Err(OperationError::Failed("clock stopped".into())));
    }
}
