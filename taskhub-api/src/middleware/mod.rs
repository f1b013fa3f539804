/// Middleware modules for the API server
///
/// - `security`: OWASP-recommended security headers

pub mod security;
