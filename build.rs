fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Usa il protoc vendorizzato se l'ambiente non ne fornisce uno.
    if std::env::var_os("PROTOC").is_none() {
        std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }

    println!("cargo:rerun-if-changed=proto/chat.proto");
    tonic_build::configure()
        .build_client(false)
        .compile_protos(&["proto/chat.proto"], &["proto"])?;
    Ok(())
}
