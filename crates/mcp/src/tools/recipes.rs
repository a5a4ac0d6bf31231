// Forwarding recipes for every BugRelay tool

use bugrelay_client::HttpMethod::{Delete, Get, Patch, Post, Put};
use bugrelay_client::{Fields, ForwardingRecipe, SessionEffect};

/// The complete recipe set, grouped the way the catalog files group tools.
pub static RECIPES: &[ForwardingRecipe] = &[
    // Bug reports
    ForwardingRecipe::new("create_bug_report", Post, "/api/v1/bugs")
        .body(Fields::Remaining)
        .required(&["title", "description"]),
    ForwardingRecipe::new("get_bug_report", Get, "/api/v1/bugs/{bug_id}").path_params(&["bug_id"]),
    ForwardingRecipe::new("list_bug_reports", Get, "/api/v1/bugs").query(Fields::Remaining),
    ForwardingRecipe::new("vote_on_bug", Post, "/api/v1/bugs/{bug_id}/vote")
        .path_params(&["bug_id"])
        .body(Fields::Only(&["vote_type"]))
        .required(&["vote_type"])
        .authenticated(),
    ForwardingRecipe::new("add_bug_comment", Post, "/api/v1/bugs/{bug_id}/comments")
        .path_params(&["bug_id"])
        .body(Fields::Only(&["content"]))
        .required(&["content"])
        .authenticated(),
    ForwardingRecipe::new("update_bug_status", Patch, "/api/v1/bugs/{bug_id}/status")
        .path_params(&["bug_id"])
        .body(Fields::Only(&["status", "resolution_notes"]))
        .required(&["status"])
        .authenticated(),
    ForwardingRecipe::new("add_company_response", Post, "/api/v1/bugs/{bug_id}/company-response")
        .path_params(&["bug_id"])
        .body(Fields::Only(&["content"]))
        .required(&["content"])
        .authenticated(),
    // Accounts
    ForwardingRecipe::new("register_user", Post, "/api/v1/auth/register")
        .body(Fields::Remaining)
        .required(&["email", "password", "display_name"]),
    ForwardingRecipe::new("login_user", Post, "/api/v1/auth/login")
        .body(Fields::Remaining)
        .required(&["email", "password"])
        .session(SessionEffect::Capture),
    ForwardingRecipe::new("refresh_token", Post, "/api/v1/auth/refresh")
        .body(Fields::Only(&["refresh_token"]))
        .required(&["refresh_token"])
        .session(SessionEffect::Capture),
    ForwardingRecipe::new("logout_user", Post, "/api/v1/auth/logout")
        .authenticated()
        .session(SessionEffect::Clear),
    ForwardingRecipe::new("get_user_profile", Get, "/api/v1/auth/profile").authenticated(),
    ForwardingRecipe::new("update_user_profile", Put, "/api/v1/auth/profile")
        .body(Fields::Remaining)
        .authenticated(),
    ForwardingRecipe::new("request_password_reset", Post, "/api/v1/auth/password-reset")
        .body(Fields::Remaining)
        .required(&["email"]),
    ForwardingRecipe::new("confirm_password_reset", Post, "/api/v1/auth/password-reset/confirm")
        .body(Fields::Remaining)
        .required(&["token", "new_password"]),
    ForwardingRecipe::new("verify_email", Get, "/api/v1/auth/verify-email")
        .query(Fields::Remaining)
        .required(&["token"]),
    // Companies
    ForwardingRecipe::new("list_companies", Get, "/api/v1/companies").query(Fields::Remaining),
    ForwardingRecipe::new("get_company", Get, "/api/v1/companies/{company_id}")
        .path_params(&["company_id"]),
    ForwardingRecipe::new("claim_company", Post, "/api/v1/companies/{company_id}/claim")
        .path_params(&["company_id"])
        .body(Fields::Only(&["verification_email"]))
        .required(&["verification_email"])
        .authenticated(),
    ForwardingRecipe::new("verify_company_claim", Post, "/api/v1/companies/{company_id}/verify")
        .path_params(&["company_id"])
        .body(Fields::Only(&["verification_token"]))
        .required(&["verification_token"])
        .authenticated(),
    ForwardingRecipe::new("get_company_dashboard", Get, "/api/v1/companies/{company_id}/dashboard")
        .path_params(&["company_id"])
        .authenticated(),
    ForwardingRecipe::new("add_team_member", Post, "/api/v1/companies/{company_id}/members")
        .path_params(&["company_id"])
        .body(Fields::Only(&["user_email", "role"]))
        .required(&["user_email"])
        .defaults(&[("role", "member")])
        .authenticated(),
    // DELETE carries no body, so the member id rides in the query string
    ForwardingRecipe::new("remove_team_member", Delete, "/api/v1/companies/{company_id}/members")
        .path_params(&["company_id"])
        .query(Fields::Only(&["user_id"]))
        .required(&["user_id"])
        .authenticated(),
    // Administration
    ForwardingRecipe::new("get_admin_dashboard", Get, "/api/v1/admin/dashboard")
        .query(Fields::Remaining)
        .authenticated(),
    ForwardingRecipe::new("list_bugs_for_moderation", Get, "/api/v1/admin/bugs")
        .query(Fields::Remaining)
        .authenticated(),
    ForwardingRecipe::new("flag_bug", Post, "/api/v1/admin/bugs/{bug_id}/flag")
        .path_params(&["bug_id"])
        .body(Fields::Only(&["reason", "notes"]))
        .required(&["reason"])
        .authenticated(),
    ForwardingRecipe::new("remove_bug", Delete, "/api/v1/admin/bugs/{bug_id}")
        .path_params(&["bug_id"])
        .authenticated(),
    ForwardingRecipe::new("restore_bug", Post, "/api/v1/admin/bugs/{bug_id}/restore")
        .path_params(&["bug_id"])
        .authenticated(),
    ForwardingRecipe::new("merge_bugs", Post, "/api/v1/admin/bugs/merge")
        .body(Fields::Remaining)
        .required(&["source_bug_id", "target_bug_id"])
        .authenticated(),
    ForwardingRecipe::new("get_audit_logs", Get, "/api/v1/admin/audit-logs")
        .query(Fields::Remaining)
        .authenticated(),
    // OAuth
    ForwardingRecipe::new("initiate_oauth_login", Get, "/api/v1/auth/oauth/{provider}")
        .path_params(&["provider"])
        .query(Fields::Only(&["redirect_uri", "state"])),
    ForwardingRecipe::new("handle_oauth_callback", Get, "/api/v1/auth/oauth/callback/{provider}")
        .path_params(&["provider"])
        .query(Fields::Only(&["code", "state"]))
        .required(&["code"])
        .session(SessionEffect::Capture),
    ForwardingRecipe::new("link_oauth_account", Post, "/api/v1/auth/oauth/link/{provider}")
        .path_params(&["provider"])
        .body(Fields::Only(&["code"]))
        .required(&["code"])
        .authenticated(),
];
