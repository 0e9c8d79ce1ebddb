//! Schemas of every type, available without configured clients

use edgeform_core::schema::ResourceSchema;

use crate::client::botman::ObjectKind;
use crate::iam::lists::{self, Lookup, Records};
use crate::{appsec, botman, cps, iam};

pub fn resources() -> Vec<ResourceSchema> {
    let mut schemas = vec![appsec::ip_geo_protection::schema()];
    schemas.extend(ObjectKind::ALL.into_iter().map(botman::object::schema));
    schemas.push(iam::blocked_user_properties::schema());
    schemas
}

pub fn data_sources() -> Vec<ResourceSchema> {
    let mut schemas = vec![appsec::configuration::schema()];
    schemas.extend(ObjectKind::ALL.into_iter().map(botman::object_list::schema));
    schemas.push(cps::enrollment::schema());
    schemas.extend(Lookup::ALL.into_iter().map(Lookup::schema));
    schemas.push(lists::states_schema());
    schemas.extend(Records::ALL.into_iter().map(Records::schema));
    schemas
}
