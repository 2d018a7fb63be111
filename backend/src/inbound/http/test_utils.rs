//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpResponse, test, web};
use serde_json::Value;

use crate::domain::ports::{
    MockAccountDirectory, MockChatInbox, MockCommunications, MockCustomerDirectory,
    MockInvoicing, MockJobScheduling, MockLoginService, MockLoyaltyProgram,
    MockOpportunityPipeline, MockPromotionsCatalog, MockReviewRequests, MockScheduledJobs,
    MockSupportDesk,
};
use crate::domain::{CustomerId, Error, Principal, Role, UserId};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Route that stores the posted principal in the session.
pub const LOGIN_AS_PATH: &str = "/test/login-as";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

pub async fn login_as(
    session: SessionContext,
    principal: web::Json<Principal>,
) -> Result<HttpResponse, Error> {
    session.persist_principal(&principal)?;
    Ok(HttpResponse::NoContent().finish())
}

/// Log in through [`LOGIN_AS_PATH`] and return the session cookie.
pub async fn session_cookie<S, B>(app: &S, principal: &Principal) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
{
    let request = test::TestRequest::post()
        .uri(LOGIN_AS_PATH)
        .set_json(principal)
        .to_request();
    let response = test::call_service(app, request).await;
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(|cookie| cookie.into_owned())
        .expect("session cookie set")
}

pub fn staff() -> Principal {
    Principal {
        user_id: UserId::random(),
        role: Role::Staff,
        customer_id: None,
    }
}

pub fn admin() -> Principal {
    Principal {
        user_id: UserId::random(),
        role: Role::Admin,
        customer_id: None,
    }
}

pub fn customer(customer_id: CustomerId) -> Principal {
    Principal {
        user_id: UserId::random(),
        role: Role::Customer,
        customer_id: Some(customer_id),
    }
}

/// State whose ports panic when called; override the ones a test needs.
pub fn test_state() -> HttpState {
    HttpState {
        login: Arc::new(MockLoginService::new()),
        accounts: Arc::new(MockAccountDirectory::new()),
        customers: Arc::new(MockCustomerDirectory::new()),
        jobs: Arc::new(MockJobScheduling::new()),
        invoices: Arc::new(MockInvoicing::new()),
        loyalty: Arc::new(MockLoyaltyProgram::new()),
        opportunities: Arc::new(MockOpportunityPipeline::new()),
        reviews: Arc::new(MockReviewRequests::new()),
        communications: Arc::new(MockCommunications::new()),
        promotions: Arc::new(MockPromotionsCatalog::new()),
        support: Arc::new(MockSupportDesk::new()),
        chat: Arc::new(MockChatInbox::new()),
        scheduled: Arc::new(MockScheduledJobs::new()),
        cron_secret: None,
    }
}

/// Full API surface behind the test session middleware.
pub fn test_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .wrap(test_session_middleware())
        .route(LOGIN_AS_PATH, web::post().to(login_as))
        .service(web::scope("/api/v1").configure(crate::inbound::http::configure_api))
}

pub async fn read_json<B>(response: ServiceResponse<B>) -> Value
where
    B: actix_web::body::MessageBody,
{
    test::read_body_json(response).await
}
