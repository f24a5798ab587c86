#[tokio::main]
async fn main() {
    if let Err(e) = keyproxy_lib::run().await {
        eprintln!("keyproxy failed: {:#}", e);
        std::process::exit(1);
    }
}
