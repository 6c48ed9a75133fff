use std::io::Result;

fn main() -> Result<()> {
    // Order matters: mongo.proto imports bson.proto
    let proto_files = &["proto/bson.proto", "proto/mongo.proto"];

    let proto_folder = "proto";

    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(proto_files, &[proto_folder])?;

    Ok(())
}
