pub mod account_service;
pub mod agency_service;
pub mod approval_service;
pub mod booking_service;
pub mod catalog_service;
pub mod facebook_auth_service;
pub mod google_auth_service;
pub mod image_service;
pub mod pricing_service;
pub mod profile_service;
pub mod rating_service;
pub mod social_auth_service;
pub mod token_service;
