mod array;
mod protocol;
