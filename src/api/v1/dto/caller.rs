/*
 * Responsibility
 * - WhoAmI response DTO: what the identity hook left in the context
 */
use serde::Serialize;

use crate::context::Context;

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct WhoAmIResponse {
    pub caller_id: Option<i64>,
    pub user_name: Option<String>,
    pub nick_name: Option<String>,
    pub company_id: Option<i64>,
    pub department_id: Option<i64>,
    pub part_ids: Option<String>,
    pub department_ids: Option<String>,
    pub roles_codes: Option<String>,

    pub device: Option<String>,
    pub mobi_app: Option<String>,
    pub version: Option<String>,
    pub platform: Option<String>,
    pub caller_ip: Option<String>,
}

impl WhoAmIResponse {
    pub fn from_context(ctx: &Context) -> Self {
        let owned = |v: Option<&str>| v.map(str::to_string);

        Self {
            caller_id: ctx.caller_id(),
            user_name: owned(ctx.user_name()),
            nick_name: owned(ctx.nick_name()),
            company_id: ctx.company_id(),
            department_id: ctx.department_id(),
            part_ids: owned(ctx.part_ids()),
            department_ids: owned(ctx.department_ids()),
            roles_codes: owned(ctx.roles_codes()),
            device: owned(ctx.device()),
            mobi_app: owned(ctx.mobi_app()),
            version: owned(ctx.version()),
            platform: owned(ctx.platform()),
            caller_ip: owned(ctx.caller_ip()),
        }
    }
}
