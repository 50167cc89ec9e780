use exec_queue::app;

#[tokio::main]
async fn main() {
    let exit_code = app::startup::startup().await;
    std::process::exit(exit_code);
}
