//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Wraps the Actix cookie session so handlers deal only with the
//! authenticated [`Principal`]: who is calling, with which role, and which
//! customer record a portal user is bound to.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;

use crate::domain::{CustomerId, Error, Principal, Role, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const ROLE_KEY: &str = "role";
pub(crate) const CUSTOMER_ID_KEY: &str = "customer_id";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

fn read_error(error: impl std::fmt::Display) -> Error {
    Error::internal(format!("failed to read session: {error}"))
}

fn write_error(error: impl std::fmt::Display) -> Error {
    Error::internal(format!("failed to persist session: {error}"))
}

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Persist the authenticated principal in the session cookie.
    pub fn persist_principal(&self, principal: &Principal) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, principal.user_id.to_string())
            .map_err(write_error)?;
        self.0
            .insert(ROLE_KEY, principal.role.as_str())
            .map_err(write_error)?;
        match principal.customer_id {
            Some(id) => self
                .0
                .insert(CUSTOMER_ID_KEY, id.to_string())
                .map_err(write_error)?,
            None => {
                self.0.remove(CUSTOMER_ID_KEY);
            }
        }
        Ok(())
    }

    /// Drop everything stored in the session.
    pub fn clear(&self) {
        self.0.purge();
    }

    /// Fetch the current principal, if present and well formed.
    pub fn principal(&self) -> Result<Option<Principal>, Error> {
        let user_id = self.0.get::<String>(USER_ID_KEY).map_err(read_error)?;
        let role = self.0.get::<String>(ROLE_KEY).map_err(read_error)?;
        let customer_id = self.0.get::<String>(CUSTOMER_ID_KEY).map_err(read_error)?;

        let (Some(user_id), Some(role)) = (user_id, role) else {
            return Ok(None);
        };
        let user_id = match user_id.parse::<UserId>() {
            Ok(id) => id,
            Err(error) => {
                tracing::warn!("invalid user id in session cookie: {error}");
                return Ok(None);
            }
        };
        let role = match role.parse::<Role>() {
            Ok(role) => role,
            Err(error) => {
                tracing::warn!("invalid role in session cookie: {error}");
                return Ok(None);
            }
        };
        let customer_id = match customer_id.map(|raw| raw.parse::<CustomerId>()).transpose() {
            Ok(id) => id,
            Err(error) => {
                tracing::warn!("invalid customer id in session cookie: {error}");
                return Ok(None);
            }
        };
        if role == Role::Customer && customer_id.is_none() {
            tracing::warn!(%user_id, "customer session without a customer id");
            return Ok(None);
        }

        Ok(Some(Principal {
            user_id,
            role,
            customer_id,
        }))
    }

    /// Require an authenticated principal or return `401 Unauthorized`.
    pub fn require_principal(&self) -> Result<Principal, Error> {
        self.principal()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Require a staff or admin principal.
    pub fn require_staff(&self) -> Result<Principal, Error> {
        let principal = self.require_principal()?;
        principal.require_staff()?;
        Ok(principal)
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};

    use crate::inbound::http::test_utils::{
        LOGIN_AS_PATH, login_as, session_cookie, test_session_middleware,
    };

    fn session_test_app() -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .wrap(test_session_middleware())
            .route(LOGIN_AS_PATH, web::post().to(login_as))
            .route(
                "/require",
                web::get().to(|session: SessionContext| async move {
                    let principal = session.require_principal()?;
                    Ok::<_, Error>(HttpResponse::Ok().body(principal.role.as_str()))
                }),
            )
            .route(
                "/staff",
                web::get().to(|session: SessionContext| async move {
                    session.require_staff()?;
                    Ok::<_, Error>(HttpResponse::Ok())
                }),
            )
            .route(
                "/logout",
                web::get().to(|session: SessionContext| async move {
                    session.clear();
                    HttpResponse::Ok()
                }),
            )
            .route(
                "/set-raw",
                web::get().to(|session: Session| async move {
                    session
                        .insert(USER_ID_KEY, "not-a-uuid")
                        .expect("set user id");
                    session.insert(ROLE_KEY, "staff").expect("set role");
                    HttpResponse::Ok()
                }),
            )
            .route(
                "/set-orphan",
                web::get().to(|session: Session| async move {
                    session
                        .insert(USER_ID_KEY, UserId::random().to_string())
                        .expect("set user id");
                    session.insert(ROLE_KEY, "customer").expect("set role");
                    HttpResponse::Ok()
                }),
            )
    }

    async fn cookie_from<S, B>(app: &S, uri: &str) -> actix_web::cookie::Cookie<'static>
    where
        S: actix_web::dev::Service<
                actix_http::Request,
                Response = actix_web::dev::ServiceResponse<B>,
                Error = actix_web::Error,
            >,
    {
        let res = test::call_service(app, test::TestRequest::get().uri(uri).to_request()).await;
        res.response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .map(|cookie| cookie.into_owned())
            .expect("session cookie set")
    }

    #[actix_web::test]
    async fn round_trips_principal() {
        let customer_id = CustomerId::random();
        let principal = Principal {
            user_id: UserId::random(),
            role: Role::Customer,
            customer_id: Some(customer_id),
        };
        let app = test::init_service(session_test_app().route(
            "/whoami",
            web::get().to(|session: SessionContext| async move {
                let principal = session.require_principal()?;
                let customer = principal
                    .customer_id
                    .map(|id| id.to_string())
                    .unwrap_or_default();
                Ok::<_, Error>(HttpResponse::Ok().body(customer))
            }),
        ))
        .await;
        let cookie = session_cookie(&app, &principal).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/whoami")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = test::read_body(res).await;
        assert_eq!(body, customer_id.to_string());
    }

    #[actix_web::test]
    async fn missing_principal_is_unauthorised() {
        let app = test::init_service(session_test_app()).await;
        let res =
            test::call_service(&app, test::TestRequest::get().uri("/require").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn tampered_user_id_is_unauthorised() {
        let app = test::init_service(session_test_app()).await;
        let cookie = cookie_from(&app, "/set-raw").await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/require")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn customer_role_without_customer_is_unauthorised() {
        let app = test::init_service(session_test_app()).await;
        let cookie = cookie_from(&app, "/set-orphan").await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/require")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn customers_are_not_staff() {
        let app = test::init_service(session_test_app()).await;
        let principal = Principal {
            user_id: UserId::random(),
            role: Role::Customer,
            customer_id: Some(CustomerId::random()),
        };
        let cookie = session_cookie(&app, &principal).await;
        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/staff")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
