//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are used
//! by Diesel for compile-time query validation and type-safe SQL generation.
//!
//! # Maintenance
//!
//! When migrations change the schema, this file should be regenerated or
//! manually updated to reflect those changes. The `diesel print-schema`
//! command can generate these definitions from a live database.

diesel::table! {
    /// Provisioned user documents keyed by the identity provider's uid.
    users (id) {
        id -> Varchar,
        /// Unique; provisioning replaces older rows holding the same email.
        email -> Varchar,
        name -> Varchar,
        /// `NONE`, `STUDENT` or `ADMIN`.
        role -> Varchar,
        created_at -> Timestamptz,
        last_access_at -> Nullable<Timestamptz>,
        access_count -> Int4,
    }
}

diesel::table! {
    /// Pending invitations, consumed on account creation.
    allow_list (email) {
        email -> Varchar,
        role -> Varchar,
        name -> Nullable<Varchar>,
        invited_at -> Timestamptz,
    }
}

diesel::table! {
    /// Postal addresses owned by one organization or one review.
    addresses (id) {
        id -> Uuid,
        street -> Varchar,
        city -> Varchar,
        state -> Nullable<Varchar>,
        postal_code -> Nullable<Varchar>,
        country -> Nullable<Varchar>,
    }
}

diesel::table! {
    organizations (id) {
        id -> Uuid,
        name -> Varchar,
        type_code -> Nullable<Varchar>,
        other_type -> Nullable<Varchar>,
        country -> Nullable<Varchar>,
        sectors -> Array<Text>,
        other_sector -> Nullable<Varchar>,
        website -> Nullable<Varchar>,
        description -> Nullable<Text>,
        approved -> Bool,
        address_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Organization contacts; `position` preserves the submitted order.
    contacts (id) {
        id -> Uuid,
        organization_id -> Uuid,
        position -> Int2,
        name -> Varchar,
        title -> Nullable<Varchar>,
        email -> Nullable<Varchar>,
        phone -> Nullable<Varchar>,
    }
}

diesel::table! {
    /// Reviews. `organization_id` carries no foreign key so reviews survive
    /// the deletion of their organization.
    reviews (id) {
        id -> Uuid,
        organization_id -> Uuid,
        reviewer_email -> Varchar,
        address_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        cost -> Nullable<Float8>,
        stipend -> Nullable<Float8>,
        duration -> Nullable<Varchar>,
        safety -> Nullable<Int2>,
        region -> Nullable<Varchar>,
        other_region -> Nullable<Varchar>,
        languages -> Array<Text>,
        sectors -> Array<Text>,
        other_sector -> Nullable<Varchar>,
        evaluation -> Nullable<Text>,
        typical_day -> Nullable<Text>,
        work_done -> Nullable<Text>,
        difficulties -> Nullable<Text>,
        responsiveness -> Nullable<Text>,
        other_comments -> Nullable<Text>,
        anonymous -> Bool,
    }
}

diesel::table! {
    /// Rows of every reference table, keyed by table name and code.
    reference_entries (table_name, code) {
        table_name -> Varchar,
        code -> Varchar,
        name -> Varchar,
    }
}

diesel::joinable!(contacts -> organizations (organization_id));

diesel::allow_tables_to_appear_in_same_query!(
    addresses,
    allow_list,
    contacts,
    organizations,
    reference_entries,
    reviews,
    users,
);
