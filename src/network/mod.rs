//! Network layer: the gRPC server exposing the workspace service.
pub mod grpc;
