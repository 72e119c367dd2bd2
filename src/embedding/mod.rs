// Embedding models: the source of the number vectors.
//
// TokenEmbedder is the seam. The default implementation runs a local ONNX
// sentence transformer; the table backend reads pretrained word vectors.

pub mod download;
pub mod onnx;
pub mod table;
pub mod traits;
