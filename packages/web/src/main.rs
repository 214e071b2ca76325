#[tokio::main]
async fn main() {
    web::start_server().await;
}
