//! Generated `tickbridge.v1` protobuf types and their mapping onto the
//! bridge's own payloads and errors.

use crate::bridge::CallError;
use crate::message;
use tonic::{Code, Status};

tonic::include_proto!("tickbridge.v1");

impl From<AddOperands> for message::AddOperands {
    fn from(wire: AddOperands) -> Self {
        message::AddOperands::new(wire.ina, wire.inb)
    }
}

impl From<message::AddOperands> for AddOperands {
    fn from(operands: message::AddOperands) -> Self {
        Self {
            ina: operands.ina,
            inb: operands.inb,
        }
    }
}

impl From<message::AddResult> for AddResult {
    fn from(result: message::AddResult) -> Self {
        Self { res: result.res }
    }
}

/// gRPC status code for a failed call.
pub fn status_code(err: &CallError) -> Code {
    use crate::message::OperationError;

    match err {
        CallError::Cancelled => Code::Cancelled,
        CallError::Unavailable => Code::Unavailable,
        CallError::TimedOut(_) => Code::DeadlineExceeded,
        CallError::ResourceExhausted { .. } => Code::ResourceExhausted,
        CallError::Operation(OperationError::ProtocolViolation(_)) => Code::InvalidArgument,
        CallError::Operation(OperationError::Failed(_)) => Code::Internal,
    }
}

impl From<CallError> for Status {
    fn from(err: CallError) -> Self {
        Status::new(status_code(&err), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::OperationError;
    use std::time::Duration;

    #[test]
    fn test_operands_convert_both_ways() {
        let wire = AddOperands { ina: 3, inb: 4 };
        let operands = message::AddOperands::from(wire.clone());
        assert_eq!(operands, message::AddOperands::new(3, 4));
        assert_eq!(AddOperands::from(operands), wire);
    }

    #[test]
    fn test_call_errors_map_to_status_codes() {
        let cases = [
            (CallError::Cancelled, Code::Cancelled),
            (CallError::Unavailable, Code::Unavailable),
            (CallError::TimedOut(Duration::from_millis(5)), Code::DeadlineExceeded),
            (CallError::ResourceExhausted { capacity: 2 }, Code::ResourceExhausted),
            (
                CallError::from(OperationError::ProtocolViolation("too wide".into())),
                Code::InvalidArgument,
            ),
            (CallError::from(OperationError::Failed("fault".into())), Code::Internal),
        ];
        for (err, code) in cases {
            assert_eq!(status_code(&err), code, "{:?}", err);
        }
    }

    #[test]
    fn test_status_keeps_error_message() {
        let status = Status::from(CallError::Cancelled);
        assert_eq!(status.code(), Code::Cancelled);
        assert_eq!(status.message(), "call cancelled: bridge is shutting down");
    }
}
