fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/tickbridge/v1/add_numbers.proto");
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/tickbridge/v1/add_numbers.proto"], &["proto"])?;
    Ok(())
}
