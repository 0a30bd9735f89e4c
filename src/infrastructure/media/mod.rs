pub mod cloudinary;

pub use cloudinary::CloudinaryStorage;
