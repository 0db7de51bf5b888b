//! Demo payloads for the built-in collections

use serde_json::{Value, json};

/// Demo records for a built-in collection, empty when it has none
pub fn demo(collection: &str) -> Vec<Value> {
    match collection {
        "courses" => courses(),
        "students" => students(),
        "feedback" => feedback(),
        _ => Vec::new(),
    }
}

pub fn courses() -> Vec<Value> {
    [
        "Computer Science",
        "Electrical Engineering",
        "Business Administration",
        "Civil Engineering",
        "Data Science",
    ]
    .into_iter()
    .map(|name| json!({ "name": name }))
    .collect()
}

pub fn students() -> Vec<Value> {
    vec![
        json!({
            "student_id": "20210001",
            "full_name": "John Doe",
            "email": "john.doe@example.com",
            "course": "Computer Science",
            "year_level": "4th Year",
            "status": "Active",
            "grade": 85
        }),
        json!({
            "student_id": "20210002",
            "full_name": "Jane Smith",
            "email": "jane.smith@example.com",
            "course": "Electrical Engineering",
            "year_level": "3rd Year",
            "status": "Active",
            "grade": 92
        }),
        json!({
            "student_id": "20210003",
            "full_name": "Robert Johnson",
            "email": "robert.j@example.com",
            "course": "Business Administration",
            "year_level": "2nd Year",
            "status": "Inactive",
            "grade": 78
        }),
        json!({
            "student_id": "20210004",
            "full_name": "Maria Parker",
            "email": "maria.p@example.com",
            "course": "Civil Engineering",
            "year_level": "4th Year",
            "status": "Graduated",
            "grade": 88
        }),
        json!({
            "student_id": "20210005",
            "full_name": "Michael Chen",
            "email": "michael.c@example.com",
            "course": "Data Science",
            "year_level": "1st Year",
            "status": "Active",
            "grade": 95
        }),
    ]
}

pub fn feedback() -> Vec<Value> {
    vec![
        json!({
            "name": "Priya Nair",
            "email": "priya@example.com",
            "category": "website",
            "rating": 4,
            "comments": "Easy to navigate, search could be faster.",
            "recommend": "yes",
            "date": "2024-03-02T09:15:00Z"
        }),
        json!({
            "name": "Tom Becker",
            "email": "tom.becker@example.com",
            "category": "service",
            "rating": 2,
            "comments": "Support took three days to answer.",
            "recommend": "no",
            "date": "2024-03-05T14:40:00Z"
        }),
        json!({
            "name": "Lena Ortiz",
            "email": "lena.o@example.com",
            "category": "product",
            "rating": 5,
            "comments": "Exactly what our team needed.",
            "recommend": "yes",
            "date": "2024-02-27T18:05:00Z"
        }),
    ]
}
