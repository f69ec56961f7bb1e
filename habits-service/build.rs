use std::io::Result;

fn main() -> Result<()> {
    // List of proto files containing a service definition
    let proto_files = &["proto/habits.proto"];

    // Name of the folder containing the proto definitions
    let proto_folder = "proto";

    // The proxy needs the client, the integration tests need the server trait.
    tonic_prost_build::configure()
        .build_client(true)
        .build_server(true)
        .compile_protos(proto_files, &[proto_folder])?;

    Ok(())
}
