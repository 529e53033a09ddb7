use log::{info, warn};
use rocket::{
    form::Form,
    http::CookieJar,
    response::{content::RawHtml, Redirect},
    Route, State,
};

use crate::config::Config;
use crate::error::Result;
use crate::model::{
    admin::{authenticate, AdminSession},
    api::LoginForm,
};
use crate::pages::Pages;

pub fn routes() -> Vec<Route> {
    routes![login_page, login_submit, logout]
}

/// Either a redirect into the dashboard or the login page again.
#[derive(Responder)]
enum LoginOutcome {
    SignedIn(Redirect),
    Rejected(RawHtml<String>),
}

#[get("/admin/login")]
fn login_page(pages: &State<Pages>) -> Result<RawHtml<String>> {
    pages.login(None)
}

#[post("/admin/login", data = "<login>")]
fn login_submit(
    login: Form<LoginForm>,
    cookies: &CookieJar<'_>,
    config: &State<Config>,
    pages: &State<Pages>,
) -> Result<LoginOutcome> {
    let password = login.password.trim();
    if password.is_empty() {
        let page = pages.login(Some("الرجاء إدخال كلمة المرور"))?;
        return Ok(LoginOutcome::Rejected(page));
    }
    if !authenticate(config.admin_password(), password) {
        warn!("Rejected admin login with an incorrect password");
        let page = pages.login(Some("كلمة المرور غير صحيحة"))?;
        return Ok(LoginOutcome::Rejected(page));
    }

    AdminSession::sign_in(cookies);
    info!("Admin signed in");
    Ok(LoginOutcome::SignedIn(Redirect::to("/admin")))
}

#[get("/admin/logout")]
fn logout(cookies: &CookieJar<'_>) -> Redirect {
    AdminSession::sign_out(cookies);
    Redirect::to("/")
}
