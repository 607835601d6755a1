#[tokio::main]
async fn main() {
    if let Err(e) = quiz_worker::run_with_config().await {
        tracing::error!(error = %e, "quiz worker exited with error");
        std::process::exit(1);
    }
}
