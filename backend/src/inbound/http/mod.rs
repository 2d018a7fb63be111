//! HTTP inbound adapter exposing the versioned REST API.
//!
//! Every handler follows the same shape: resolve the session principal,
//! authorise, call one driving port, wrap the result in the response
//! envelope. Handlers never touch repositories directly.

pub mod auth;
pub mod chat;
pub mod cron;
pub mod customers;
pub mod envelope;
pub mod error;
pub mod health;
pub mod invoices;
pub mod jobs;
pub mod loyalty;
pub mod messages;
pub mod opportunities;
pub mod promotions;
pub mod reviews;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod tickets;
pub mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register every `/api/v1` route plus the extractor error handlers.
///
/// Mount under a scope:
///
/// ```ignore
/// App::new().service(web::scope("/api/v1").configure(configure_api))
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .app_data(web::PathConfig::default().error_handler(error::path_error_handler))
        .service(auth::login)
        .service(auth::logout)
        .service(auth::current_account)
        .service(auth::create_account)
        .service(customers::create_customer)
        .service(customers::list_customers)
        .service(customers::get_customer)
        .service(customers::update_customer)
        .service(customers::archive_customer)
        .service(loyalty::get_loyalty_account)
        .service(loyalty::list_ledger)
        .service(loyalty::redeem_points)
        .service(loyalty::adjust_points)
        .service(jobs::create_job)
        .service(jobs::list_jobs)
        .service(jobs::get_job)
        .service(jobs::update_job_status)
        .service(invoices::create_invoice)
        .service(invoices::list_invoices)
        .service(invoices::get_invoice)
        .service(invoices::send_invoice)
        .service(invoices::pay_invoice)
        .service(invoices::void_invoice)
        .service(opportunities::create_opportunity)
        .service(opportunities::list_opportunities)
        .service(opportunities::get_opportunity)
        .service(opportunities::transition_opportunity)
        .service(reviews::list_reviews)
        .service(reviews::get_review)
        .service(reviews::submit_review)
        .service(messages::list_messages)
        .service(messages::send_message)
        .service(promotions::create_promotion)
        .service(promotions::list_promotions)
        .service(promotions::get_promotion)
        .service(promotions::validate_promotion)
        .service(promotions::redeem_promotion)
        .service(promotions::deliver_promotion)
        .service(tickets::open_ticket)
        .service(tickets::list_tickets)
        .service(tickets::get_ticket)
        .service(tickets::respond_to_ticket)
        .service(tickets::update_ticket_status)
        .service(chat::start_conversation)
        .service(chat::list_conversations)
        .service(chat::get_conversation)
        .service(chat::list_chat_messages)
        .service(chat::post_chat_message)
        .service(chat::close_conversation)
        .service(cron::run_cron_job);
}
