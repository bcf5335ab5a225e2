use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Shared secret used to sign payment URLs and verify provider callbacks.
    pub payment_secret: String,
    /// Base URL of the redirect payment provider's pay page.
    pub payment_base_url: String,
    /// URL the provider redirects the customer back to.
    pub payment_return_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_secret = env::var("JWT_SECRET")?;
        let payment_secret = env::var("PAYMENT_SECRET")?;
        let payment_base_url = env::var("PAYMENT_BASE_URL")
            .unwrap_or_else(|_| "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_string());
        let payment_return_url = env::var("PAYMENT_RETURN_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3000/api/payments/return".to_string());
        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            payment_secret,
            payment_base_url,
            payment_return_url,
        })
    }
}
