//! Module for profiles, login, signup and profile settings

use askama::Template;
use cookie::{Cookie, SameSite};
use gotham::state::{client_addr, FromState, State};
use hyper::{header, Body, Response};
use log::{info, warn};

use super::{DocumentResult, TemplateExt};
use crate::{
    config::Settings,
    db::DbConnection,
    form::{self, Errors, ProfileForm, RegistrationForm},
    handler::{
        login_required,
        paths::{LoginQuery, PageQuery, UserPath},
        see_other, NotFound,
    },
    paginate::Page,
    policy,
    post::{self, Entry},
    urls,
    user::{self, Login, Session, User, Viewer, COOKIE_NAME},
};

fn session_cookie<'a>(state: &State, id: &str) -> Cookie<'a> {
    let settings = Settings::borrow_from(state);
    let mut cookie = Cookie::build(COOKIE_NAME, id.to_owned())
        .path("/")
        .same_site(SameSite::Strict)
        .http_only(true)
        .finish();
    if settings.cookie.secure {
        cookie.set_secure(true);
    }
    if let Some(ref domain) = settings.cookie.domain {
        cookie.set_domain(domain.to_owned());
    }
    cookie
}

/// Redirects to `location`, logging in with the new session.
fn start(state: &State, session: &Session, location: &str) -> DocumentResult {
    let mut response = see_other(state, location.to_owned());
    set_cookie(&mut response, session_cookie(state, &session.id))?;
    Ok(response)
}

fn set_cookie(response: &mut Response<Body>, cookie: Cookie) -> Result<(), failure::Error> {
    response
        .headers_mut()
        .append(header::SET_COOKIE, cookie.to_string().parse()?);
    Ok(())
}

#[derive(Template)]
#[template(path = "profile.html")]
struct ProfileTemplate<'a> {
    profile: User,
    page: Page<Entry>,
    /// Whether the viewer is looking at their own profile
    is_owner: bool,
    viewer: Option<&'a Viewer>,
}

/// A user's profile and their posts
pub fn view(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let viewer = Viewer::try_borrow_from(state);
    let username = &UserPath::borrow_from(state).username;
    let requested = PageQuery::borrow_from(state).page();

    let profile = user::by_username(connection, username)?.ok_or(NotFound)?;
    let page = post::profile_page(connection, viewer, profile.id, requested)?;

    let template = ProfileTemplate {
        is_owner: policy::is_author(viewer, profile.id),
        profile,
        page,
        viewer,
    };
    Ok(template.to_response(state))
}

#[derive(Template)]
#[template(path = "profile-edit.html")]
struct ProfileEditTemplate<'a> {
    viewer: Option<&'a Viewer>,
    form: ProfileForm,
    errors: Errors,
}

/// Form for editing your own profile
pub fn edit(state: &State) -> DocumentResult {
    let viewer = match login_required(state) {
        Ok(viewer) => viewer,
        Err(redirect) => return Ok(redirect),
    };
    let connection = &DbConnection::from_state(state)?;
    let current = user::get(connection, viewer.id)?;

    let template = ProfileEditTemplate {
        viewer: Some(viewer),
        form: ProfileForm::from(&current),
        errors: Errors::new(),
    };
    Ok(template.to_response(state))
}

/// Result for changing profile information
pub fn edit_post(state: &State, body: Vec<u8>) -> DocumentResult {
    let viewer = match login_required(state) {
        Ok(viewer) => viewer,
        Err(redirect) => return Ok(redirect),
    };
    let form: ProfileForm = serde_urlencoded::from_bytes(&body)?;
    let connection = &DbConnection::from_state(state)?;

    let errors = match form.validate() {
        Ok(profile) => {
            if !user::username_taken(connection, &profile.username, Some(viewer.id))? {
                user::edit_profile(connection, viewer.id, &profile)?;
                info!("User '{}' edited their profile", profile.username);
                return Ok(see_other(state, urls::profile(&profile.username)));
            }
            let mut errors = Errors::new();
            errors.add("username", form::USERNAME_TAKEN);
            errors
        }
        Err(errors) => errors,
    };

    let template = ProfileEditTemplate {
        viewer: Some(viewer),
        form,
        errors,
    };
    Ok(template.to_response(state))
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate<'a> {
    viewer: Option<&'a Viewer>,
    username: String,
    next: String,
    /// Set when the submitted credentials were wrong
    failed: bool,
}

/// Login form
pub fn login(state: &State) -> DocumentResult {
    let next = LoginQuery::borrow_from(state).next.clone();
    Ok(LoginTemplate {
        viewer: Viewer::try_borrow_from(state),
        username: String::new(),
        next: next.unwrap_or_default(),
        failed: false,
    }
    .to_response(state))
}

/// Login post. Sets session cookie if login was successful.
pub fn login_post(state: &State, body: Vec<u8>) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let credentials: Login = serde_urlencoded::from_bytes(&body)?;

    match credentials.login(connection)? {
        Some(session) => start(state, &session, urls::safe_next(credentials.next.as_deref())),
        None => Ok(LoginTemplate {
            viewer: Viewer::try_borrow_from(state),
            username: credentials.username.clone(),
            next: credentials.next.clone().unwrap_or_default(),
            failed: true,
        }
        .to_response(state)),
    }
}

#[derive(Template)]
#[template(path = "logout.html")]
struct LogoutTemplate<'a> {
    viewer: Option<&'a Viewer>,
}

pub fn logout(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;

    if let Some(viewer) = Viewer::try_borrow_from(state) {
        user::logout(connection, &viewer.session)?;
        info!("User '{}' logged out", viewer.username);
    }

    let mut response = LogoutTemplate { viewer: None }.to_response(state);

    // Delete session cookie with Max-Age=0
    let cookie = Cookie::build(COOKIE_NAME, "")
        .path("/")
        .max_age(time::Duration::zero())
        .finish();
    set_cookie(&mut response, cookie)?;

    Ok(response)
}

#[derive(Template)]
#[template(path = "registration.html")]
struct RegistrationTemplate<'a> {
    viewer: Option<&'a Viewer>,
    form: RegistrationForm,
    errors: Errors,
}

/// Signup form
pub fn registration(state: &State) -> DocumentResult {
    Ok(RegistrationTemplate {
        viewer: Viewer::try_borrow_from(state),
        form: RegistrationForm::default(),
        errors: Errors::new(),
    }
    .to_response(state))
}

/// Creates the user and logs them in.
pub fn registration_post(state: &State, body: Vec<u8>) -> DocumentResult {
    let mut form: RegistrationForm = serde_urlencoded::from_bytes(&body)?;

    // If the `phone` field is filled out we caught a spammer
    if form.is_spam() {
        let addr = match client_addr(state) {
            Some(addr) => format!("{}", addr),
            None => String::from("unavailable"),
        };
        warn!(
            "Caught spam user with username '{}' and client IP '{}'",
            form.username, addr,
        );
        return Err(failure::err_msg(
            "You're not supposed to fill out this field",
        ));
    }

    let connection = &DbConnection::from_state(state)?;
    let errors = match form.validate() {
        Ok(new_user) => {
            if !user::username_taken(connection, &new_user.username, None)? {
                let created = user::create(connection, new_user)?;
                info!("User '{}' signed up", created.username);
                let session = user::start_session(connection, created.id)?;
                return start(state, &session, urls::INDEX);
            }
            let mut errors = Errors::new();
            errors.add("username", form::USERNAME_TAKEN);
            errors
        }
        Err(errors) => errors,
    };

    // Never send passwords back
    form.password1.clear();
    form.password2.clear();
    Ok(RegistrationTemplate {
        viewer: Viewer::try_borrow_from(state),
        form,
        errors,
    }
    .to_response(state))
}
