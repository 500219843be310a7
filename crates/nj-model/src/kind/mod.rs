mod policy;
pub use policy::FailurePolicy;
