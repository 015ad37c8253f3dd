use axum::response::Html;

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Welcome page HTML", content_type = "text/html")
    ),
    tag = "General"
)]
pub async fn root() -> Html<&'static str> {
    Html(r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <meta name="viewport" content="width=device-width, initial-scale=1.0">
            <title>Document Verification</title>
            <style>
                body {
                    display: flex;
                    flex-direction: column;
                    justify-content: center;
                    align-items: center;
                    height: 100vh;
                    margin: 0;
                    font-family: Arial, sans-serif;
                    background-color: #f4f6f8;
                }
                h1 { color: #1f2933; }
                p { color: #52606d; }
                a {
                    margin-top: 20px;
                    padding: 10px 20px;
                    background-color: #0b6e4f;
                    color: white;
                    text-decoration: none;
                    border-radius: 5px;
                    font-weight: bold;
                }
            </style>
        </head>
        <body>
            <h1>Document Verification Service</h1>
            <p>Check an official document by its number at <code>/verify?nomor_dokumen=...</code></p>
            <a href="/swagger-ui/">Explore API Docs</a>
        </body>
        </html>
    "#)
}
