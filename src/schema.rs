table! {
    categories (id) {
        id -> Int4,
        title -> Varchar,
        description -> Text,
        slug -> Varchar,
        is_published -> Bool,
        created_at -> Timestamp,
    }
}

table! {
    comments (id) {
        id -> Int4,
        text -> Text,
        post_id -> Int4,
        author_id -> Int4,
        created_at -> Timestamp,
    }
}

table! {
    locations (id) {
        id -> Int4,
        name -> Varchar,
        is_published -> Bool,
        created_at -> Timestamp,
    }
}

table! {
    posts (id) {
        id -> Int4,
        title -> Varchar,
        text -> Text,
        pub_date -> Timestamp,
        author_id -> Int4,
        location_id -> Nullable<Int4>,
        category_id -> Nullable<Int4>,
        image -> Nullable<Varchar>,
        is_published -> Bool,
        created_at -> Timestamp,
    }
}

table! {
    sessions (id) {
        id -> Varchar,
        user_id -> Int4,
        expires -> Timestamp,
    }
}

table! {
    users (id) {
        id -> Int4,
        username -> Varchar,
        first_name -> Varchar,
        last_name -> Varchar,
        email -> Varchar,
        hash -> Varchar,
        salt -> Bytea,
        joined_at -> Timestamp,
    }
}

joinable!(comments -> posts (post_id));
joinable!(comments -> users (author_id));
joinable!(posts -> users (author_id));
joinable!(sessions -> users (user_id));

allow_tables_to_appear_in_same_query!(categories, comments, locations, posts, sessions, users,);
