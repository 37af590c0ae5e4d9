//! Account creation page and endpoint.

use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    account::{AccountType, NewAccount, accounts_page::AccountState, create_account},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
};

/// Form data for account creation.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountFormData {
    pub code: String,
    pub name: String,
    pub account_type: String,
}

/// Render the account creation page.
pub async fn get_new_account_page() -> Response {
    let nav_bar = NavBar::new(endpoints::NEW_ACCOUNT_VIEW).into_html();
    let form = new_account_form_view("");

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Create Account", &[], &content).into_response()
}

/// Handle account creation form submission.
pub async fn create_account_endpoint(
    State(state): State<AccountState>,
    Form(form): Form<AccountFormData>,
) -> Response {
    let account_type: AccountType = match form.account_type.parse() {
        Ok(account_type) => account_type,
        Err(error) => {
            return new_account_form_view(&format!("Error: {error}")).into_response();
        }
    };

    let new_account = NewAccount {
        code: form.code,
        name: form.name,
        account_type,
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_account(new_account, &connection) {
        Ok(account) => {
            tracing::info!("created account {} {}", account.code, account.name);

            (
                HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error @ Error::EmptyField(_)) => {
            new_account_form_view(&format!("Error: {error}")).into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

fn new_account_form_view(error_message: &str) -> Markup {
    html! {
        form
            hx-post=(endpoints::POST_ACCOUNT)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="code" class=(FORM_LABEL_STYLE) { "Code" }

                input
                    id="code"
                    type="text"
                    name="code"
                    placeholder="1200"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="name" class=(FORM_LABEL_STYLE) { "Name" }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Petty Cash"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="account_type" class=(FORM_LABEL_STYLE) { "Type" }

                select
                    id="account_type"
                    name="account_type"
                    required
                    class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for account_type in AccountType::ALL {
                        option value=(account_type) { (account_type) }
                    }
                }
            }

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400"
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Account" }
        }
    }
}

#[cfg(test)]
mod new_account_page_tests {
    use axum::http::StatusCode;
    use scraper::Selector;

    use crate::{
        account::get_new_account_page,
        endpoints,
        test_utils::{
            assert_content_type, assert_form_input, assert_form_submit_button, assert_hx_endpoint,
            assert_valid_html, must_get_form, parse_html_document,
        },
    };

    #[tokio::test]
    async fn render_page() {
        let response = get_new_account_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::POST_ACCOUNT, "hx-post");
        assert_form_input(&form, "code", "text");
        assert_form_input(&form, "name", "text");
        assert_form_submit_button(&form);

        let options = form
            .select(&Selector::parse("select[name=account_type] option").unwrap())
            .count();
        assert_eq!(options, 5);
    }
}
