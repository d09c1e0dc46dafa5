use mock_appliance::Appliance;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "8443".to_string());
    let user = std::env::var("MOCK_USER").unwrap_or_else(|_| "root".to_string());
    let password = std::env::var("MOCK_PASSWORD").unwrap_or_else(|_| "vmware".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    println!("mock appliance listening on http://{addr}/VMtest/");
    mock_appliance::run(listener, Appliance::new(&user, &password).shared()).await
}
