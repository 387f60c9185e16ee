//! Declarative helpers shared by the entity modules.

/// Declares a transparent newtype over the `INTEGER` primary key of a table.
///
/// The second argument is either the entity struct (linked in the generated
/// doc) or a plain noun for entities whose struct name would read oddly.
macro_rules! id_struct {
    ($id_name:ident, $entity:ident $(,)?) => {
        id_struct!($id_name, concat!("[`", stringify!($entity), "`] row"));
    };
    ($id_name:ident, $noun:expr $(,)?) => {
        #[doc = concat!("Id of a ", $noun, ".")]
        #[derive(
            sqlx::Type, Serialize, Deserialize, From, Into, Debug, Copy, Clone, PartialEq, Eq,
            Hash, PartialOrd, Ord,
        )]
        #[sqlx(transparent)]
        pub struct $id_name(pub i32);
    };
}
