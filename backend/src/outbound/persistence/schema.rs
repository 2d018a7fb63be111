//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Staff, admin and portal login accounts.
    accounts (id) {
        id -> Uuid,
        username -> Varchar,
        display_name -> Varchar,
        role -> Varchar,
        customer_id -> Nullable<Uuid>,
        password_hash -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    customers (id) {
        id -> Uuid,
        name -> Varchar,
        email -> Nullable<Varchar>,
        phone -> Nullable<Varchar>,
        address -> Nullable<Text>,
        /// IANA zone name, e.g. `Europe/London`.
        time_zone -> Nullable<Varchar>,
        email_opt_in -> Bool,
        sms_opt_in -> Bool,
        notes -> Nullable<Text>,
        archived -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    jobs (id) {
        id -> Uuid,
        customer_id -> Uuid,
        service_type -> Varchar,
        scheduled_start -> Timestamptz,
        duration_minutes -> Int4,
        price_cents -> Int8,
        status -> Varchar,
        assigned_cleaner -> Nullable<Varchar>,
        notes -> Nullable<Text>,
        reminder_sent_at -> Nullable<Timestamptz>,
        completed_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    invoices (id) {
        id -> Uuid,
        customer_id -> Uuid,
        job_id -> Nullable<Uuid>,
        subtotal_cents -> Int8,
        discount_cents -> Int8,
        total_cents -> Int8,
        status -> Varchar,
        promotion_code -> Nullable<Varchar>,
        due_date -> Date,
        issued_at -> Nullable<Timestamptz>,
        paid_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    loyalty_accounts (customer_id) {
        customer_id -> Uuid,
        points_balance -> Int8,
        lifetime_points -> Int8,
        tier -> Varchar,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only point movements.
    loyalty_ledger (id) {
        id -> Uuid,
        customer_id -> Uuid,
        delta -> Int8,
        reason -> Varchar,
        reference_id -> Nullable<Uuid>,
        note -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    opportunities (id) {
        id -> Uuid,
        customer_id -> Uuid,
        kind -> Varchar,
        status -> Varchar,
        score -> Int2,
        estimated_value_cents -> Int8,
        notes -> Nullable<Text>,
        expires_at -> Nullable<Timestamptz>,
        contacted_at -> Nullable<Timestamptz>,
        closed_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    review_requests (id) {
        id -> Uuid,
        customer_id -> Uuid,
        /// Unique: one review request per job.
        job_id -> Uuid,
        status -> Varchar,
        next_action_at -> Nullable<Timestamptz>,
        reminders_sent -> Int4,
        rating -> Nullable<Int2>,
        comment -> Nullable<Text>,
        sent_at -> Nullable<Timestamptz>,
        completed_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Outbound email/SMS log.
    messages (id) {
        id -> Uuid,
        customer_id -> Uuid,
        channel -> Varchar,
        purpose -> Varchar,
        subject -> Nullable<Varchar>,
        body -> Text,
        status -> Varchar,
        scheduled_for -> Nullable<Timestamptz>,
        sent_at -> Nullable<Timestamptz>,
        error -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    promotions (id) {
        id -> Uuid,
        code -> Varchar,
        description -> Text,
        discount_kind -> Varchar,
        discount_value -> Int8,
        starts_at -> Timestamptz,
        ends_at -> Timestamptz,
        max_redemptions -> Nullable<Int4>,
        redemption_count -> Int4,
        min_tier -> Nullable<Varchar>,
        active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per customer per promotion.
    promotion_redemptions (promotion_id, customer_id) {
        promotion_id -> Uuid,
        customer_id -> Uuid,
        amount_cents -> Int8,
        discount_cents -> Int8,
        redeemed_at -> Timestamptz,
    }
}

diesel::table! {
    tickets (id) {
        id -> Uuid,
        customer_id -> Uuid,
        subject -> Varchar,
        body -> Text,
        priority -> Varchar,
        status -> Varchar,
        escalation_level -> Int4,
        response_due_at -> Timestamptz,
        first_response_at -> Nullable<Timestamptz>,
        last_response -> Nullable<Text>,
        resolved_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    conversations (id) {
        id -> Uuid,
        customer_id -> Uuid,
        subject -> Nullable<Varchar>,
        status -> Varchar,
        last_message_at -> Timestamptz,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    chat_messages (id) {
        id -> Uuid,
        conversation_id -> Uuid,
        sender -> Varchar,
        body -> Text,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(accounts -> customers (customer_id));
diesel::joinable!(jobs -> customers (customer_id));
diesel::joinable!(invoices -> customers (customer_id));
diesel::joinable!(loyalty_accounts -> customers (customer_id));
diesel::joinable!(loyalty_ledger -> customers (customer_id));
diesel::joinable!(opportunities -> customers (customer_id));
diesel::joinable!(review_requests -> jobs (job_id));
diesel::joinable!(messages -> customers (customer_id));
diesel::joinable!(promotion_redemptions -> promotions (promotion_id));
diesel::joinable!(tickets -> customers (customer_id));
diesel::joinable!(conversations -> customers (customer_id));
diesel::joinable!(chat_messages -> conversations (conversation_id));

diesel::allow_tables_to_appear_in_same_query!(
    accounts,
    chat_messages,
    conversations,
    customers,
    invoices,
    jobs,
    loyalty_accounts,
    loyalty_ledger,
    messages,
    opportunities,
    promotion_redemptions,
    promotions,
    review_requests,
    tickets,
);
