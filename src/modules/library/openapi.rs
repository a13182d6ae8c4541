use serde_json::{json, Value};

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn json_response(description: &str, schema: Value) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

fn json_body(schema: Value) -> Value {
    json!({
        "required": true,
        "content": { "application/json": { "schema": schema } }
    })
}

fn id_param(name: &str) -> Value {
    json!({
        "name": name,
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int64" }
    })
}

fn book_ref() -> Value {
    json!({ "$ref": "#/components/schemas/Book" })
}

fn book_list() -> Value {
    json!({ "type": "array", "items": book_ref() })
}

/// OpenAPI paths and schemas for the library module, relative to its prefix.
pub fn fragment() -> Value {
    json!({
        "paths": {
            "/health": {
                "get": {
                    "summary": "Library module health check",
                    "tags": ["Library"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": { "text/plain": { "schema": { "type": "string" } } }
                        }
                    }
                }
            },
            "/borrowers": {
                "post": {
                    "summary": "Register a borrower",
                    "tags": ["Borrowers"],
                    "requestBody": json_body(json!({ "$ref": "#/components/schemas/NewBorrower" })),
                    "responses": {
                        "200": json_response(
                            "Registered borrower",
                            json!({ "$ref": "#/components/schemas/Borrower" })
                        ),
                        "400": error_response("Blank name or malformed email"),
                        "409": error_response("Email already registered")
                    }
                }
            },
            "/books": {
                "get": {
                    "summary": "List all books",
                    "tags": ["Books"],
                    "responses": {
                        "200": json_response("All books", book_list()),
                        "500": error_response("Internal server error")
                    }
                },
                "post": {
                    "summary": "Register a book",
                    "tags": ["Books"],
                    "requestBody": json_body(json!({ "$ref": "#/components/schemas/NewBook" })),
                    "responses": {
                        "200": json_response("Registered book", book_ref()),
                        "400": error_response("A required field is blank")
                    }
                }
            },
            "/books/bulk": {
                "post": {
                    "summary": "Register several books atomically",
                    "tags": ["Books"],
                    "requestBody": json_body(json!({
                        "type": "array",
                        "items": { "$ref": "#/components/schemas/NewBook" }
                    })),
                    "responses": {
                        "200": json_response("Registered books, in request order", book_list()),
                        "400": error_response("At least one book is invalid; nothing was stored")
                    }
                }
            },
            "/borrow/{book_id}/borrower/{borrower_id}": {
                "post": {
                    "summary": "Lend a book to a borrower",
                    "tags": ["Lending"],
                    "parameters": [id_param("book_id"), id_param("borrower_id")],
                    "responses": {
                        "200": json_response("Book now borrowed", book_ref()),
                        "404": error_response("Book or borrower not found"),
                        "409": error_response("Book already borrowed")
                    }
                }
            },
            "/return/{book_id}": {
                "post": {
                    "summary": "Return a borrowed book",
                    "tags": ["Lending"],
                    "parameters": [id_param("book_id")],
                    "responses": {
                        "200": json_response("Book available again", book_ref()),
                        "404": error_response("Book not found"),
                        "409": error_response("Book has not been borrowed")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Borrower": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "name": { "type": "string" },
                        "email": { "type": "string", "format": "email" }
                    },
                    "required": ["id", "name", "email"]
                },
                "NewBorrower": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "email": { "type": "string", "format": "email" }
                    },
                    "required": ["name", "email"]
                },
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "integer", "format": "int64" },
                        "isbn": { "type": "string" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "borrowed": { "type": "boolean" },
                        "borrower": {
                            "oneOf": [
                                { "type": "null" },
                                { "$ref": "#/components/schemas/Borrower" }
                            ]
                        }
                    },
                    "required": ["id", "isbn", "title", "author", "borrowed", "borrower"]
                },
                "NewBook": {
                    "type": "object",
                    "properties": {
                        "isbn": { "type": "string" },
                        "title": { "type": "string" },
                        "author": { "type": "string" }
                    },
                    "required": ["isbn", "title", "author"]
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let spec = fragment();
        let paths = spec["paths"].as_object().unwrap();
        for path in [
            "/health",
            "/borrowers",
            "/books",
            "/books/bulk",
            "/borrow/{book_id}/borrower/{borrower_id}",
            "/return/{book_id}",
        ] {
            assert!(paths.contains_key(path), "{path} missing from OpenAPI fragment");
        }
        assert!(spec["components"]["schemas"]["Book"].is_object());
    }
}
