//! Named setters and getters for every context key, the way handlers read them.

use std::sync::Arc;

use axum::http::request::Parts;

use super::keys;
use super::store::{Context, StagedHeaders};

macro_rules! string_accessors {
    ($($key:ident: $with:ident, $get:ident;)*) => {
        impl Context {
            $(
                pub fn $with(&self, value: impl Into<String>) -> Self {
                    self.with::<keys::$key>(value.into())
                }

                pub fn $get(&self) -> Option<&str> {
                    self.get::<keys::$key>().map(String::as_str)
                }
            )*
        }
    };
}

macro_rules! id_accessors {
    ($($key:ident: $with:ident, $get:ident;)*) => {
        impl Context {
            $(
                pub fn $with(&self, value: i64) -> Self {
                    self.with::<keys::$key>(value)
                }

                pub fn $get(&self) -> Option<i64> {
                    self.get::<keys::$key>().copied()
                }
            )*
        }
    };
}

string_accessors! {
    Sign: with_sign, sign;
    Device: with_device, device;
    MobiApp: with_mobi_app, mobi_app;
    Version: with_version, version;
    Platform: with_platform, platform;
    CallerIp: with_caller_ip, caller_ip;
    UserName: with_user_name, user_name;
    NickName: with_nick_name, nick_name;
    PartIds: with_part_ids, part_ids;
    DepartmentIds: with_department_ids, department_ids;
    RolesCodes: with_roles_codes, roles_codes;
    MethodName: with_method_name, method_name;
    ServiceName: with_service_name, service_name;
    PackageName: with_package_name, package_name;
}

id_accessors! {
    CallerId: with_caller_id, caller_id;
    CompanyId: with_company_id, company_id;
    DepartmentId: with_department_id, department_id;
}

impl Context {
    pub fn with_status_code(&self, code: u16) -> Self {
        self.with::<keys::StatusCode>(code)
    }

    pub fn status_code(&self) -> Option<u16> {
        self.get::<keys::StatusCode>().copied()
    }

    pub fn with_http_request(&self, parts: Arc<Parts>) -> Self {
        self.with::<keys::HttpRequest>(parts)
    }

    pub fn http_request(&self) -> Option<&Parts> {
        self.get::<keys::HttpRequest>().map(Arc::as_ref)
    }

    pub fn with_response_headers(&self, headers: StagedHeaders) -> Self {
        self.with::<keys::ResponseHeaders>(headers)
    }

    pub fn response_headers(&self) -> Option<&StagedHeaders> {
        self.get::<keys::ResponseHeaders>()
    }
}
