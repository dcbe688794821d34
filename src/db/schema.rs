diesel::table! {
    buckets (key) {
        key -> Text,
        body -> Text,
    }
}
