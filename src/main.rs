#[tokio::main]
async fn main() {
    if let Err(e) = chronic_claims::run().await {
        eprintln!("chronic-claims: {e}");
        std::process::exit(1);
    }
}
