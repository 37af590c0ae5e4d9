//! Properties that are leased by the month and their leases.

mod core;
mod handlers;
mod leases_page;

pub use core::{
    Lease, LeaseId, LeaseStatus, NewLease, Property, PropertyId, create_lease, create_lease_table,
    create_property, create_property_table, get_all_leases, get_all_properties, get_lease,
    get_property, terminate_lease,
};
pub use handlers::{create_lease_endpoint, create_property_endpoint, terminate_lease_endpoint};
pub use leases_page::get_leases_page;
