#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    if let Err(e) = pgswitch_cli::run(std::env::args().collect()).await {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
