pub mod trusted;

use actix_web::web;
use ta_shared::config::TrustedLoginConfig;

/// Mount the trusted login, logout and whoami endpoints
pub fn configure(cfg: &mut web::ServiceConfig, login: &TrustedLoginConfig) {
    let registration_path = login.registration_path.trim_end_matches('/');
    let logout_path = format!("{}/logout", registration_path);

    cfg.route(registration_path, web::get().to(trusted::login::trusted_login))
        .route(&logout_path, web::post().to(trusted::logout::logout))
        .service(web::scope("/api/v1").route("/me", web::get().to(trusted::me::me)));
}
