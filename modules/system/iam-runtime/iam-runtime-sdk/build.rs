fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "grpc")]
    {
        const PROTOS: [&str; 3] = [
            "proto/runtime/iam/v1/authentication.proto",
            "proto/runtime/iam/v1/authorization.proto",
            "proto/runtime/iam/v1/identity.proto",
        ];

        println!("cargo:rerun-if-changed=proto");
        tonic_prost_build::configure()
            .build_client(true)
            .build_server(true)
            .compile_protos(&PROTOS, &["proto"])?;
    }

    Ok(())
}
