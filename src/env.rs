use lazy_static::lazy_static;

lazy_static! {
    /// Postgres connection string.
    pub static ref DATABASE_URL: String =
        dotenvy::var("DATABASE_URL").expect("missing DATABASE_URL environment variable");

    /// Domain name, with no trailing slash. Example: `https://mods.example.com`
    pub static ref DOMAIN: String = dotenvy::var("DOMAIN_NAME")
        .expect("missing DOMAIN_NAME environment variable")
        .trim_end_matches('/')
        .to_string();

    /// Base URL of the external platform member API, with no trailing slash.
    pub static ref PLATFORM_API_URL: String = dotenvy::var("PLATFORM_API_URL")
        .expect("missing PLATFORM_API_URL environment variable")
        .trim_end_matches('/')
        .to_string();

    /// Address to bind the HTTP server to.
    pub static ref BIND_ADDRESS: String =
        dotenvy::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
}
