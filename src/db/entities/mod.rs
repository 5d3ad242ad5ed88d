pub mod local_entries;

pub use local_entries::{
    ActiveModel as LocalEntryActiveModel, Entity as LocalEntry, Model as LocalEntryModel,
};
