//! Route handlers for adding properties, leasing them and terminating leases.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use serde::Deserialize;
use time::Date;

use crate::{
    Error, endpoints,
    lease::{
        LeaseId, NewLease, PropertyId, create_lease, create_property, leases_page::LeaseState,
        terminate_lease,
    },
    money::Money,
};

/// Form data for adding a property.
#[derive(Debug, Deserialize)]
pub struct PropertyFormData {
    pub name: String,
    pub monthly_rent: Money,
}

/// Form data for leasing a property.
#[derive(Debug, Deserialize)]
pub struct LeaseFormData {
    pub property_id: PropertyId,
    pub tenant_name: String,
    pub start_date: Date,
    pub end_date: Date,
    /// Left empty to use the property's monthly rent.
    pub monthly_rent: Option<Money>,
}

fn redirect_to_leases() -> Response {
    (
        HxRedirect(endpoints::LEASES_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// A route handler for adding a property.
pub async fn create_property_endpoint(
    State(state): State<LeaseState>,
    Form(form): Form<PropertyFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_property(&form.name, form.monthly_rent, &connection) {
        Ok(property) => {
            tracing::info!("added property {} \"{}\"", property.id, property.name);
            redirect_to_leases()
        }
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler for leasing a property.
///
/// Responds with a conflict alert if the property is already leased during the requested dates.
pub async fn create_lease_endpoint(
    State(state): State<LeaseState>,
    Form(form): Form<LeaseFormData>,
) -> Response {
    let new_lease = NewLease {
        property_id: form.property_id,
        tenant_name: form.tenant_name,
        start_date: form.start_date,
        end_date: form.end_date,
        monthly_rent: form.monthly_rent,
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_lease(new_lease, &connection) {
        Ok(lease) => {
            tracing::info!(
                "leased property {} from {} to {} (lease {})",
                lease.property_id,
                lease.start_date,
                lease.end_date,
                lease.id
            );
            redirect_to_leases()
        }
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler for terminating a lease.
pub async fn terminate_lease_endpoint(
    State(state): State<LeaseState>,
    Path(lease_id): Path<LeaseId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match terminate_lease(lease_id, &connection) {
        Ok(()) => {
            tracing::info!("terminated lease {lease_id}");
            redirect_to_leases()
        }
        Err(error) => error.into_alert_response(),
    }
}

#[cfg(test)]
mod lease_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use axum_extra::extract::Form;
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        endpoints,
        lease::{
            LeaseStatus, PropertyId, create_property, get_all_leases, get_all_properties,
            leases_page::LeaseState,
        },
        money::Money,
        test_utils::{assert_hx_redirect, open_test_db},
    };

    use super::{
        LeaseFormData, PropertyFormData, create_lease_endpoint, create_property_endpoint,
        terminate_lease_endpoint,
    };

    fn get_state() -> (LeaseState, PropertyId) {
        let connection = open_test_db();
        let property = create_property("Unit 1", Money::new(dec!(1200)), &connection).unwrap();

        let state = LeaseState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        };

        (state, property.id)
    }

    fn lease_form(property_id: PropertyId, start: time::Date, end: time::Date) -> LeaseFormData {
        LeaseFormData {
            property_id,
            tenant_name: "John Smith".to_owned(),
            start_date: start,
            end_date: end,
            monthly_rent: None,
        }
    }

    #[tokio::test]
    async fn leases_property_and_rejects_overlap() {
        let (state, property_id) = get_state();

        let first = create_lease_endpoint(
            State(state.clone()),
            Form(lease_form(
                property_id,
                date!(2024 - 01 - 01),
                date!(2024 - 07 - 01),
            )),
        )
        .await;
        let overlapping = create_lease_endpoint(
            State(state.clone()),
            Form(lease_form(
                property_id,
                date!(2024 - 03 - 01),
                date!(2024 - 09 - 01),
            )),
        )
        .await;

        assert_eq!(first.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&first, endpoints::LEASES_VIEW);
        assert_eq!(overlapping.status(), StatusCode::CONFLICT);
        assert_eq!(
            get_all_leases(&state.db_connection.lock().unwrap())
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn terminates_lease() {
        let (state, property_id) = get_state();
        create_lease_endpoint(
            State(state.clone()),
            Form(lease_form(
                property_id,
                date!(2024 - 01 - 01),
                date!(2024 - 07 - 01),
            )),
        )
        .await;
        let lease_id = get_all_leases(&state.db_connection.lock().unwrap()).unwrap()[0].id;

        let response = terminate_lease_endpoint(State(state.clone()), Path(lease_id)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            get_all_leases(&state.db_connection.lock().unwrap()).unwrap()[0].status,
            LeaseStatus::Terminated
        );
    }

    #[tokio::test]
    async fn empty_property_name_returns_alert() {
        let (state, _) = get_state();
        let form = PropertyFormData {
            name: "".to_owned(),
            monthly_rent: Money::new(dec!(900)),
        };

        let response = create_property_endpoint(State(state.clone()), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            get_all_properties(&state.db_connection.lock().unwrap())
                .unwrap()
                .len(),
            1
        );
    }
}
