table! {
    pull_requests (pr_id) {
        pr_id -> Integer,
        title -> Text,
        user_login -> Text,
        labels -> Text,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    pr_files (id) {
        id -> Integer,
        pr_id -> Integer,
        file_path -> Text,
    }
}

table! {
    reviews (id) {
        id -> Integer,
        pr_id -> Integer,
        reviewer -> Text,
        review_date -> Nullable<Timestamp>,
        state -> Text,
    }
}

table! {
    feedback (reviewer) {
        reviewer -> Text,
        fav_rev_points -> Double,
    }
}
