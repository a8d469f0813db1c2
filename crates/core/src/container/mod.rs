pub mod collection;
pub mod scope;

pub use collection::{ServiceCollection, ServiceDescriptor, ServiceEntry, ServiceKey};
pub use scope::ServiceScope;
