/// Implements [`TableEntity`](crate::domain::ports::TableEntity) for a struct
/// carrying `etag: Option<String>` and `timestamp: Option<DateTime<Utc>>`.
macro_rules! table_entity {
    (
        $ty:ty,
        table = $table:literal,
        partition = |$p:ident| $partition:expr,
        row = |$r:ident| $row:expr
        $(, secondary = |$s:ident| $secondary:expr)? $(,)?
    ) => {
        impl $crate::domain::ports::TableEntity for $ty {
            const TABLE: &'static str = $table;

            fn partition_key(&self) -> String {
                let $p = self;
                $partition
            }

            fn row_key(&self) -> &str {
                let $r = self;
                $row
            }

            $(
                fn secondary_key(&self) -> Option<&str> {
                    let $s = self;
                    $secondary
                }
            )?

            fn etag(&self) -> Option<&str> {
                self.etag.as_deref()
            }

            fn stamp(&mut self, etag: String, timestamp: chrono::DateTime<chrono::Utc>) {
                self.etag = Some(etag);
                self.timestamp = Some(timestamp);
            }
        }
    };
}

pub mod blocked_date;
pub mod booking;
pub mod idempotency;
pub mod provider;
pub mod schedule;
pub mod service;
pub mod staff;
pub mod user;
