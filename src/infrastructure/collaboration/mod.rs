pub mod http_collaboration;
