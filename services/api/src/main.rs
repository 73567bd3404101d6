use workline_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("workline-api: {err}");
        std::process::exit(1);
    }
}
