use diesel::prelude::*;
use super::schema::buckets;


#[derive(Queryable, Selectable)]
#[diesel(table_name = buckets)]
pub struct BucketRow {
    pub key: String,
    pub body: String,
}

#[derive(Insertable)]
#[diesel(table_name = buckets)]
pub struct NewBucketRow<'a> {
    pub key: &'a str,
    pub body: &'a str,
}
