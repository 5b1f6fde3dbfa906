pub mod company;
pub mod invoice;

pub use company::CompanySummary;
pub use invoice::InvoiceSummary;

pub use company::Entity as Company;
pub use invoice::Entity as Invoice;
