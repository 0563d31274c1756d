mod photo;

pub use self::photo::PhotoRecord;
pub(crate) use self::photo::PhotoRow;
