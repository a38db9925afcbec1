mod storage;

pub use storage::{
    ALLOWED_EXTENSIONS, ImageStorage, ImageStorageError, MAX_IMAGE_BYTES, check_image,
    secure_filename,
};
