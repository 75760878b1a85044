use crate::model::request::{EmployeeId, UserId};
use crate::model::role::Role;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};

/// Caller identity, placed in request extensions by `auth_middleware`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<EmployeeId>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(ErrorUnauthorized("Missing token"))),
        }
    }
}

impl AuthUser {
    pub fn require_approver(&self) -> actix_web::Result<()> {
        if self.role.is_approver() {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("HR/Admin only"))
        }
    }

    pub fn is_approver(&self) -> bool {
        self.role.is_approver()
    }

    /// The caller's own employee record.
    pub fn own_employee_id(&self) -> actix_web::Result<EmployeeId> {
        self.employee_id
            .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))
    }

    /// Whose data a read is about. Approvers may name any employee; everyone
    /// else only themselves.
    pub fn resolve_employee(&self, requested: Option<EmployeeId>) -> actix_web::Result<EmployeeId> {
        match requested {
            Some(id) if self.is_approver() || self.employee_id == Some(id) => Ok(id),
            Some(_) => Err(actix_web::error::ErrorForbidden("Not your employee record")),
            None => self.own_employee_id(),
        }
    }

    /// Owners and approvers may see a request.
    pub fn may_read(&self, owner: EmployeeId) -> actix_web::Result<()> {
        if self.is_approver() || self.employee_id == Some(owner) {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Not your request"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    fn user(role: Role, employee_id: Option<EmployeeId>) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "someone".to_string(),
            role,
            employee_id,
        }
    }

    #[test]
    fn employees_only_resolve_to_themselves() {
        let employee = user(Role::Employee, Some(10));
        assert_eq!(employee.resolve_employee(None).unwrap(), 10);
        assert_eq!(employee.resolve_employee(Some(10)).unwrap(), 10);
        let err = employee.resolve_employee(Some(11)).unwrap_err();
        assert_eq!(err.as_response_error().status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn approvers_may_name_anyone_but_need_a_profile_for_themselves() {
        let hr = user(Role::Hr, None);
        assert_eq!(hr.resolve_employee(Some(11)).unwrap(), 11);
        assert!(hr.resolve_employee(None).is_err());
        assert!(hr.may_read(11).is_ok());
        assert!(hr.require_approver().is_ok());
        assert!(user(Role::ApiUser, Some(3)).require_approver().is_err());
        assert!(user(Role::Employee, Some(3)).may_read(4).is_err());
    }
}
