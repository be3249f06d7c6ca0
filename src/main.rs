#[tokio::main]
async fn main() {
    if let Err(e) = offeriq_lib::run().await {
        eprintln!("offeriq: {e}");
        std::process::exit(1);
    }
}
