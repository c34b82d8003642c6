#[cfg(test)]
mod tests {
    use crate::schemas::ApiDoc;
    use utoipa::openapi::{PathItemType, RefOr, schema::Schema, security::SecurityScheme};
    use utoipa::OpenApi;

    fn object_properties(name: &str) -> Vec<String> {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();
        match components.schemas.get(name) {
            Some(RefOr::T(Schema::Object(obj))) => obj.properties.keys().cloned().collect(),
            other => panic!("{} should be an object schema, got {:?}", name, other),
        }
    }

    #[test]
    fn test_openapi_schema_generation() {
        let openapi = ApiDoc::openapi();

        let components = openapi.components.as_ref().unwrap();
        for name in [
            "ErrorResponse",
            "HealthResponse",
            "LoginRequest",
            "RegisterUserRequest",
            "CreateLoanRequest",
            "UpdateLoanRequest",
            "LoanResponse",
            "UserResponse",
            "UserProfileResponse",
        ] {
            assert!(components.schemas.contains_key(name), "missing schema {}", name);
        }

        assert!(serde_json::to_string(&openapi).is_ok());
    }

    #[test]
    fn test_error_response_schema_structure() {
        let properties = object_properties("ErrorResponse");
        for field in ["error", "code", "success"] {
            assert!(properties.iter().any(|p| p == field));
        }
    }

    #[test]
    fn test_user_response_hides_password() {
        let properties = object_properties("UserResponse");
        assert!(properties.iter().any(|p| p == "username"));
        assert!(!properties.iter().any(|p| p.contains("password")));
    }

    #[test]
    fn test_all_routes_are_documented() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;

        let expected = [
            ("/health", PathItemType::Get),
            ("/api/v1/auth/login", PathItemType::Post),
            ("/api/v1/users", PathItemType::Post),
            ("/api/v1/users", PathItemType::Get),
            ("/api/v1/users/me", PathItemType::Get),
            ("/api/v1/users/{user_id}", PathItemType::Get),
            ("/api/v1/users/{user_id}", PathItemType::Delete),
            ("/api/v1/users/{user_id}/status", PathItemType::Put),
            ("/api/v1/loans", PathItemType::Get),
            ("/api/v1/loans", PathItemType::Post),
            ("/api/v1/loans/{loan_id}", PathItemType::Get),
            ("/api/v1/loans/{loan_id}", PathItemType::Put),
            ("/api/v1/loans/{loan_id}", PathItemType::Delete),
        ];

        for (path, method) in expected {
            let item = paths
                .get(path)
                .unwrap_or_else(|| panic!("missing path {}", path));
            assert!(item.operations.contains_key(&method), "missing {:?} {}", method, path);
        }
    }

    #[test]
    fn test_bearer_security_scheme_is_registered() {
        let openapi = ApiDoc::openapi();
        let components = openapi.components.as_ref().unwrap();

        match components.security_schemes.get("bearer_auth") {
            Some(SecurityScheme::Http(_)) => {}
            other => panic!("expected http bearer scheme, got {:?}", other),
        }

        let json = serde_json::to_string(&openapi).unwrap();
        assert!(json.contains("\"bearer_auth\""));
    }

    #[test]
    fn test_error_responses_reference_schema_by_name() {
        let openapi_json = serde_json::to_string(&ApiDoc::openapi()).unwrap();

        assert!(!openapi_json.contains("crate.schemas.ErrorResponse"));
        assert!(openapi_json.contains("#/components/schemas/ErrorResponse"));
    }
}
